/// PLY writer module.
pub mod ply;
