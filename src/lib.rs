// Базовые модули
pub mod config;
pub mod error;
pub mod metrics;

// Ресурсы чтения и примитив открытия файлов
pub mod source; // ReadSource + FileSource
pub mod opener; // FileOpener + LocalOpener

// Диагностика (контекст открытия, sink)
pub mod diag;

// Монитор хэндлов: registry -> group -> stream
pub mod monitor; // src/monitor/{mod,registry,group,stream,report}.rs

// Файловая система-хозяин
pub mod fs;

// CLI (scan / rm): тела команд живут в библиотеке, бинарь только диспетчер
pub mod cli;

// Удобные реэкспорты
pub use config::{BacktraceMode, MonitorConfig};
pub use diag::{DiagnosticSink, LogSink, OpenContext};
pub use error::{HandleError, HandleResult};
pub use fs::LocalFileSystem;
pub use metrics::MetricsSnapshot;
pub use monitor::{
    FileReport, HandleGroup, HandleMonitor, MonitorReport, OpenerReport, StreamState,
    TrackedStream,
};
pub use opener::{FileOpener, LocalOpener};
pub use source::{FileSource, ReadSource};
