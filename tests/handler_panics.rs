//! Panic output around handlers. Kept in its own test binary because it
//! installs a process-wide panic hook.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cliframe::{App, AppSettings, ArgSpec, Console, EntryInfo, Handler};

#[tokio::test]
async fn handler_panics_skip_the_previous_hook() {
    let printed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&printed);
    panic::set_hook(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let settings = AppSettings {
        handle_interrupts: false,
        ..AppSettings::default()
    };

    let (console, captured) = Console::capture();
    let mut app = App::with_arguments(
        EntryInfo::new("tool", "1.0"),
        Vec::<ArgSpec>::new(),
        Handler::sync(|_| panic!("sync kaboom")),
    )
    .unwrap()
    .with_console(console)
    .with_settings(settings.clone());
    assert_eq!(app.run(&[]).await, Ok(1));
    assert_eq!(captured.stderr(), "Unhandled console panic: sync kaboom\n");

    let (console, captured) = Console::capture();
    let mut app = App::with_arguments(
        EntryInfo::new("tool", "1.0"),
        Vec::<ArgSpec>::new(),
        Handler::asynchronous(|_| async {
            if true {
                panic!("async kaboom");
            }
            anyhow::Ok(0)
        }),
    )
    .unwrap()
    .with_console(console)
    .with_settings(settings);
    assert_eq!(app.run(&[]).await, Ok(1));
    assert_eq!(captured.stderr(), "Unhandled console panic: async kaboom\n");

    assert_eq!(printed.load(Ordering::SeqCst), 0);

    let outside = panic::catch_unwind(|| panic!("outside a handler"));
    assert!(outside.is_err());
    assert_eq!(printed.load(Ordering::SeqCst), 1);
}
