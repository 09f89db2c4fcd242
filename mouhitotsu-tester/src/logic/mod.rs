pub mod playthrough;
pub mod reports;
pub mod tester;

pub use playthrough::{GameTester, TesterAssets};
pub use tester::*;
