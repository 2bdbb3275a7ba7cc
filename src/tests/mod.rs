//! End-to-end scenario tests: one file per scenario under `locator/`,
//! each driving [`crate::locator::locate`] directly rather than
//! exercising a single module in isolation.

mod locator;
