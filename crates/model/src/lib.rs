pub use serde_with;
pub use utility::geo::Coordinate;

pub mod archive;
pub mod notification;
pub mod route;

pub trait ExampleData {
    fn example_data() -> Self;
}
