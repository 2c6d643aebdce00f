use exif::{Rational, Value};

/// Denominator of the seconds rational, giving 1/10000 arc-second steps.
pub const SECONDS_DENOMINATOR: u32 = 10_000;

pub fn dms_to_dd(deg: f64, min: f64, sec: f64) -> f64 {
    deg + min / 60.0 + sec / 3600.0
}

/// An unsigned angle in the degrees/minutes/seconds form stored in GPS IFDs.
///
/// `seconds` is expressed in units of 1/`SECONDS_DENOMINATOR` arc-second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Dms {
    /// Quantizes the magnitude of `deg`; the sign is carried separately by
    /// the N/S and E/W reference tags.
    pub fn from_degrees(deg: f64) -> Self {
        let deg = deg.abs();
        let degrees = deg.floor();
        let minutes = ((deg - degrees) * 60.0).floor();
        let seconds = (((deg - degrees) * 60.0 - minutes) * 60.0 * SECONDS_DENOMINATOR as f64).round();

        Dms {
            degrees: degrees as u32,
            minutes: minutes as u32,
            seconds: seconds as u32,
        }
    }

    pub fn to_rationals(self) -> Vec<Rational> {
        vec![
            Rational { num: self.degrees, denom: 1 },
            Rational { num: self.minutes, denom: 1 },
            Rational { num: self.seconds, denom: SECONDS_DENOMINATOR },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalDegrees(pub f64);

impl From<Dms> for DecimalDegrees {
    fn from(dms: Dms) -> Self {
        DecimalDegrees(dms_to_dd(
            dms.degrees as f64,
            dms.minutes as f64,
            dms.seconds as f64 / SECONDS_DENOMINATOR as f64,
        ))
    }
}

/// Decodes a GPS latitude or longitude value of any denominator.
pub fn rationals_to_degrees(value: &Value) -> Option<DecimalDegrees> {
    match value {
        Value::Rational(parts) if parts.len() >= 3 => {
            if parts[..3].iter().any(|part| part.denom == 0) {
                return None;
            }

            Some(DecimalDegrees(dms_to_dd(
                parts[0].to_f64(),
                parts[1].to_f64(),
                parts[2].to_f64(),
            )))
        }
        _ => None,
    }
}

/// Reference letter for a signed coordinate: `positive` when >= 0.
pub fn hemisphere(value: f64, positive: &'static str, negative: &'static str) -> &'static str {
    if value >= 0.0 {
        positive
    } else {
        negative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARC_SECOND_STEP: f64 = 1.0 / 3600.0 / SECONDS_DENOMINATOR as f64;

    #[test]
    fn quantizes_known_value() {
        // 48.8583701 = 48° 51' 30.13236"
        let dms = Dms::from_degrees(48.8583701);

        assert_eq!(dms.degrees, 48);
        assert_eq!(dms.minutes, 51);
        assert_eq!(dms.seconds, 301_324);
    }

    #[test]
    fn sign_is_stripped() {
        assert_eq!(Dms::from_degrees(-122.4194), Dms::from_degrees(122.4194));
    }

    #[test]
    fn decoding_stays_within_one_step() {
        for &deg in &[0.0, 0.5, 10.0, 10.123456789, 45.999999, 89.99999, 179.87654321, -33.8688] {
            let DecimalDegrees(decoded) = Dms::from_degrees(deg).into();

            assert!(
                (decoded - deg.abs()).abs() <= ARC_SECOND_STEP,
                "{} decoded as {}",
                deg,
                decoded
            );
        }
    }

    #[test]
    fn rationals_decode_through_exif_value() {
        let value = Value::Rational(Dms::from_degrees(20.5).to_rationals());

        assert_eq!(rationals_to_degrees(&value), Some(DecimalDegrees(20.5)));
    }

    #[test]
    fn zero_denominator_is_rejected() {
        let value = Value::Rational(vec![
            Rational { num: 1, denom: 1 },
            Rational { num: 1, denom: 0 },
            Rational { num: 1, denom: 1 },
        ]);

        assert_eq!(rationals_to_degrees(&value), None);
    }

    #[test]
    fn hemisphere_letters() {
        assert_eq!(hemisphere(0.0, "N", "S"), "N");
        assert_eq!(hemisphere(-0.1, "N", "S"), "S");
        assert_eq!(hemisphere(-70.0, "E", "W"), "W");
    }
}
