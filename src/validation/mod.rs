pub mod geofence;
pub mod sequencing;
