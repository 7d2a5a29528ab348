mod bandmapping;
mod dataset;
mod instance;
mod operation;
mod resample;

use bandmapping::*;
use dataset::*;
use instance::*;
pub use operation::*;
use resample::*;
