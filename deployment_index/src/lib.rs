/*!
Derived deployment metrics and the Military Deployment Index.

The reference datasets (deployments, population, active duty personnel) are
loaded once into a [`RecordStore`] with a [`builder::Builder`]. All the
computations are pure functions over the store:

* [`compute_country_metrics`] for a selection of countries and a year
* [`compute_mdi_table`] and [`compute_mdi_for_year`] for the index
* the [`trends`] series and the [`precompute`] tables

See the [`manual`] for the input formats and the definition of the index.
*/

mod config;

pub mod builder;
pub mod countries;
pub mod manual;
pub mod mdi;
pub mod metrics;
pub mod precompute;
pub mod primitives;
pub mod store;
pub mod trends;

pub use crate::config::*;
pub use crate::mdi::{compute_mdi_for_year, compute_mdi_table, mdi_for_selection};
pub use crate::metrics::compute_country_metrics;
pub use crate::store::RecordStore;
