pub mod descriptor_model;
pub mod ids;
pub mod normalize;
pub mod normalized_model;
pub mod ordered;
pub mod validate;
