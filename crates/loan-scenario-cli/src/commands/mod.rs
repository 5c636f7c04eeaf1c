pub mod comparison;
pub mod guidance;
pub mod loan;
pub mod sensitivity;
