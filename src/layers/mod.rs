pub mod feature;
pub mod icons;
