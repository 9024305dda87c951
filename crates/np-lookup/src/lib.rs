//! # np-lookup
//!
//! Scale-factor lookup surfaces for NanoPost.
//!
//! Efficiency corrections are exported from histogram files into a small
//! JSON container of named 2-D surfaces, loaded once per job and queried
//! per lepton.
//!
//! ## Example
//!
//! ```no_run
//! use np_lookup::SurfaceFile;
//!
//! let f = SurfaceFile::open("RunBCDEF_SF_Trigger.json").unwrap();
//! let sf = f.surface("IsoMu24_OR_IsoTkMu24_PtEtaBins/pt_abseta_ratio").unwrap();
//! println!("weight: {}", sf.value_at(35.0, 1.2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod file;
pub mod surface;

pub use error::{Result, SurfaceError};
pub use file::SurfaceFile;
pub use surface::Surface2d;
