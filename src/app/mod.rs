pub mod dispatch;
mod inspect;
mod status;
