pub mod notifier;
pub mod signal_monitor;
pub mod signal_scanner;

pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use signal_monitor::SignalMonitor;
pub use signal_scanner::SignalScanner;
