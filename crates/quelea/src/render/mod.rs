pub mod background;
pub mod coordinator;
pub mod dispatch;
pub mod fit;
pub mod metrics;
pub mod paint;
pub mod sizer;
pub mod surface;
pub mod transition;

#[cfg(test)]
mod tests;
