pub mod binance_kline_ws;
pub mod notifier;
pub mod slack;
pub mod webhook;

pub use binance_kline_ws::{parse_kline_message, BinanceKlineWebSocket, StreamEvent, BINANCE_WS_URL};
pub use notifier::{LogNotifier, Notifier};
pub use slack::SlackNotifier;
pub use webhook::{WebhookFormat, WebhookNotifier};
