pub mod dispatch;
pub mod repair;
pub mod run;
