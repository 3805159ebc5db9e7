//! Test suite.

mod bulk;
mod collision;
mod completeness;
mod iter;
mod shape;
mod traits;
mod transient;
