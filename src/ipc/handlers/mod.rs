pub mod assignments;
pub mod associations;
pub mod backup;
pub mod calc;
pub mod core;
pub mod courses;
pub mod grades;
pub mod students;
