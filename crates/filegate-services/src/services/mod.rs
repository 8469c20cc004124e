#[cfg(feature = "clamav")]
pub mod clamav;
pub mod factory;
pub mod scanner;

#[cfg(feature = "clamav")]
pub use clamav::ClamAVScanner;
pub use factory::create_scanner;
pub use scanner::{
    Detection, ScanError, ScannerHealth, ScannerStatus, UnavailableScanner, VirusScanner,
};
