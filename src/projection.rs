//! Projection metadata and the north polar stereographic projection.
//!
//! SIC files carry a free-text `spatial_ref` (WKT) plus numeric
//! attributes on the `projection` variable. Only the projection name is
//! scraped from the text. The grammar accepted by
//! [`parse_projection_name`] is:
//!
//! ```text
//! spatial_ref := <anything> "PROJECTION" <anything but '['> "[" body "]" <anything>
//! body        := name ("," <anything with balanced brackets>)?
//! name        := ws* quote token quote ws*  |  ws* token ws*
//! ```
//!
//! The closing `]` is the one matching the opening `[`, so WKT such as
//! `PROJECTION["Polar_Stereographic",AUTHORITY["EPSG","9810"]]` yields
//! `Polar_Stereographic`. Quotes are `"` or `'`; an unquoted token ends at
//! `,` or `[`.
//!
//! The numeric attributes drive the actual projection: central longitude and
//! true-scale latitude are truncated to whole degrees, ellipsoid axes are used
//! as-is.

use gdal::spatial_ref::SpatialRef;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use thiserror::Error;

const PROJECTION_MARKER: &str = "PROJECTION";

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("spatial_ref has no \"PROJECTION\" marker")]
    MissingMarker,
    #[error("no '[' after \"PROJECTION\" marker")]
    MissingOpenBracket,
    #[error("projection name bracket is never closed")]
    UnterminatedBracket,
    #[error("projection name is empty")]
    EmptyName,
    #[error("invalid ellipsoid: semimajor {semimajor}, semiminor {semiminor}")]
    InvalidEllipsoid { semimajor: f64, semiminor: f64 },
    #[error("GDAL spatial reference error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Extracts the bracketed projection name following the `PROJECTION` marker.
pub fn parse_projection_name(spatial_ref: &str) -> Result<String, ProjectionError> {
    let start = spatial_ref
        .find(PROJECTION_MARKER)
        .ok_or(ProjectionError::MissingMarker)?;
    let rest = &spatial_ref[start + PROJECTION_MARKER.len()..];

    let open = rest.find('[').ok_or(ProjectionError::MissingOpenBracket)?;
    let body = &rest[open + 1..];
    let close = matching_bracket(body).ok_or(ProjectionError::UnterminatedBracket)?;

    let inner = body[..close].trim_start();
    let token = match inner.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let quoted = &inner[1..];
            quoted.find(quote).map_or(quoted, |end| &quoted[..end])
        }
        _ => inner.split([',', '[']).next().unwrap_or(""),
    };

    let name = token.trim();
    if name.is_empty() {
        return Err(ProjectionError::EmptyName);
    }

    Ok(name.to_string())
}

// Byte offset of the `]` closing a bracket opened just before `body`.
fn matching_bracket(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Raw projection attributes as stored in a SIC file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDescriptor {
    pub spatial_ref: String,
    pub projection_name: String,
    pub semimajor_radius: f64,
    pub semiminor_radius: f64,
    pub standard_parallel: f64,
    pub longitude_of_projection_origin: f64,
}

impl ProjectionDescriptor {
    pub fn new(
        spatial_ref: String,
        semimajor_radius: f64,
        semiminor_radius: f64,
        standard_parallel: f64,
        longitude_of_projection_origin: f64,
    ) -> Result<Self, ProjectionError> {
        let projection_name = parse_projection_name(&spatial_ref)?;

        Ok(Self {
            spatial_ref,
            projection_name,
            semimajor_radius,
            semiminor_radius,
            standard_parallel,
            longitude_of_projection_origin,
        })
    }

    pub fn polar_stereographic(&self) -> Result<PolarStereographic, ProjectionError> {
        Ok(PolarStereographic::new(
            self.longitude_of_projection_origin.trunc() as i32,
            self.standard_parallel.trunc() as i32,
            Globe::new(self.semimajor_radius, self.semiminor_radius)?,
        ))
    }
}

/// Reference ellipsoid, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globe {
    pub semimajor_axis: f64,
    pub semiminor_axis: f64,
}

impl Globe {
    pub fn new(semimajor_axis: f64, semiminor_axis: f64) -> Result<Self, ProjectionError> {
        let valid = semimajor_axis.is_finite()
            && semiminor_axis.is_finite()
            && semiminor_axis > 0.0
            && semiminor_axis <= semimajor_axis;
        if !valid {
            return Err(ProjectionError::InvalidEllipsoid {
                semimajor: semimajor_axis,
                semiminor: semiminor_axis,
            });
        }

        Ok(Self {
            semimajor_axis,
            semiminor_axis,
        })
    }

    pub fn eccentricity(&self) -> f64 {
        let ratio = self.semiminor_axis / self.semimajor_axis;
        (1.0 - ratio * ratio).sqrt()
    }
}

/// North polar stereographic projection on an ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarStereographic {
    pub central_longitude: i32,
    pub true_scale_latitude: i32,
    pub globe: Globe,
}

impl PolarStereographic {
    pub fn new(central_longitude: i32, true_scale_latitude: i32, globe: Globe) -> Self {
        Self {
            central_longitude,
            true_scale_latitude,
            globe,
        }
    }

    pub fn to_proj4(&self) -> String {
        format!(
            "+proj=stere +lat_0=90 +lat_ts={} +lon_0={} +k=1 +x_0=0 +y_0=0 +a={} +b={} {}",
            self.true_scale_latitude,
            self.central_longitude,
            self.globe.semimajor_axis,
            self.globe.semiminor_axis,
            "+units=m +no_defs",
        )
    }

    pub fn spatial_ref(&self) -> Result<SpatialRef, ProjectionError> {
        Ok(SpatialRef::from_proj4(&self.to_proj4())?)
    }

    /// Geographic degrees to projected metres.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let e = self.globe.eccentricity();
        let rho = self.rho_scale() * tsfn(lat.to_radians(), e);
        let dlon = (lon - self.central_longitude as f64).to_radians();

        (rho * dlon.sin(), -rho * dlon.cos())
    }

    /// Projected metres to geographic degrees, longitude in (-180, 180].
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let e = self.globe.eccentricity();
        let rho = x.hypot(y);
        if rho == 0.0 {
            return (self.central_longitude as f64, 90.0);
        }

        let t = rho / self.rho_scale();
        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..15 {
            let es = e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(e / 2.0)).atan();
            let converged = (next - phi).abs() < 1e-12;
            phi = next;
            if converged {
                break;
            }
        }

        let lon = self.central_longitude as f64 + x.atan2(-y).to_degrees();
        (wrap_longitude(lon), phi.to_degrees())
    }

    // rho = scale * t(phi)
    fn rho_scale(&self) -> f64 {
        let a = self.globe.semimajor_axis;
        let e = self.globe.eccentricity();

        if self.true_scale_latitude == 90 {
            return 2.0 * a / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt();
        }

        let phi_c = (self.true_scale_latitude as f64).to_radians();
        let sin_c = phi_c.sin();
        let m_c = phi_c.cos() / (1.0 - e * e * sin_c * sin_c).sqrt();
        a * m_c / tsfn(phi_c, e)
    }
}

// Snyder (1987) eq. 15-9.
fn tsfn(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 { 180.0 } else { wrapped }
}
