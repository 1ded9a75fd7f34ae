//! lii-materials: particle material and bath gas properties.
//!
//! Provides:
//! - `Property`: temperature-dependent property functions
//! - `AbsorptionFunction`: E(m) as a function of wavelength, incl. Drude theory
//! - `MaterialProperties` / `GasProperties`: the interface heat transfer models
//!   and temperature fits consume
//! - `Material`, `Gas`, `GasMixture`: property-table implementations
//! - `catalog`: illustrative parameter sets for soot, iron, silicon and common gases
//!
//! # Example
//!
//! ```
//! use lii_materials::{catalog, MaterialProperties};
//!
//! let soot = catalog::soot();
//! let rho = soot.rho_p(2500.0).unwrap();
//! assert!(rho > 1000.0);
//! ```

pub mod absorption;
pub mod catalog;
pub mod error;
pub mod gas;
pub mod material;
pub mod property;

pub use absorption::AbsorptionFunction;
pub use error::{MaterialError, MaterialResult};
pub use gas::{Gas, GasMixture, GasProperties, GasProperty};
pub use material::{Material, MaterialProperties, MaterialProperty};
pub use property::Property;
