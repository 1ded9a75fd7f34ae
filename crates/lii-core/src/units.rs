// lii-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, Mass as UomMass, MassDensity as UomMassDensity,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
    Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn nm(v: f64) -> Length {
    use uom::si::length::nanometer;
    Length::new::<nanometer>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn ns(v: f64) -> Time {
    use uom::si::time::nanosecond;
    Time::new::<nanosecond>(v)
}

/// Wavelengths are configured in nm but always computed in m.
#[inline]
pub fn nm_to_m(v: f64) -> f64 {
    v * 1e-9
}

pub mod constants {
    /// Planck constant [J s]
    pub const PLANCK_H: f64 = 6.626_070_15e-34;
    /// Speed of light in vacuum [m/s]
    pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e8;
    /// Boltzmann constant [J/K]
    pub const BOLTZMANN_K: f64 = 1.380_649e-23;
    /// Avogadro constant [1/mol]
    pub const AVOGADRO: f64 = 6.022_140_76e23;
    /// Universal gas constant [J/(mol K)]
    pub const GAS_CONSTANT_R: f64 = 8.314_462_618;
    /// Stefan-Boltzmann constant [W/(m^2 K^4)]
    pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;

    /// First radiation constant for spectral radiance, 2 h c^2 [W m^2 / sr]
    pub const C1: f64 = 2.0 * PLANCK_H * SPEED_OF_LIGHT * SPEED_OF_LIGHT;
    /// Second radiation constant, h c / k [m K]
    pub const C2: f64 = PLANCK_H * SPEED_OF_LIGHT / BOLTZMANN_K;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _l = m(2.0);
        let _dt = s(0.1);
        assert!((bar(1.0).value - 1e5).abs() < 1e-9);
        assert!((nm(650.0).value - 650e-9).abs() < 1e-18);
        assert!((ns(5.0).value - 5e-9).abs() < 1e-18);
    }

    #[test]
    fn second_radiation_constant() {
        assert!((constants::C2 - 1.438_776_877e-2).abs() < 1e-10);
    }
}
