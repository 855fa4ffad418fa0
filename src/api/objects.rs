//! Printer object queries and the status shapes Klipper reports.
//!
//! Klipper exposes its state as named objects (`toolhead`, `extruder`,
//! `print_stats`, ...). A query names the objects of interest and
//! optionally a subset of their fields; the server answers with the current
//! values. [`PrinterObjects`] covers the commonly used objects, but any
//! deserializable type can be requested instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::MoonrakerClient;
use crate::error::Result;

/// Objects and fields to query or subscribe to.
///
/// ```
/// use moonraker_rpc::api::ObjectQuery;
///
/// let query = ObjectQuery::new()
///     .object("toolhead")
///     .fields("extruder", ["temperature", "target"]);
/// assert_eq!(
///     serde_json::to_string(&query).expect("serialize"),
///     r#"{"objects":{"extruder":["temperature","target"],"toolhead":null}}"#
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ObjectQuery {
    objects: BTreeMap<String, Option<Vec<String>>>,
}

impl ObjectQuery {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Request every field of `name`.
    #[must_use]
    pub fn object(mut self, name: impl Into<String>) -> Self {
        self.objects.insert(name.into(), None);
        self
    }

    /// Request only `fields` of `name`.
    #[must_use]
    pub fn fields<I, S>(mut self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects
            .insert(name.into(), Some(fields.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}

/// Result of a query or subscription: the values of the requested objects
/// at `eventtime`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ObjectStatus<T> {
    #[serde(default)]
    pub eventtime: f64,
    pub status: T,
}

/// Status of the commonly used Klipper objects. Objects not requested are
/// `None`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrinterObjects {
    pub webhooks: Option<Webhooks>,
    pub gcode_move: Option<GcodeMove>,
    pub toolhead: Option<Toolhead>,
    #[serde(rename = "configfile")]
    pub config_file: Option<ConfigFile>,
    pub extruder: Option<Extruder>,
    pub heater_bed: Option<HeaterBed>,
    pub fan: Option<Fan>,
    pub idle_timeout: Option<IdleTimeout>,
    pub virtual_sdcard: Option<VirtualSdcard>,
    pub print_stats: Option<PrintStats>,
    pub display_status: Option<DisplayStatus>,
    pub bed_mesh: Option<BedMesh>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Webhooks {
    pub state: String,
    pub state_message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GcodeMove {
    pub speed_factor: f64,
    pub speed: f64,
    pub extrude_factor: f64,
    pub absolute_coordinates: bool,
    pub absolute_extrude: bool,
    pub homing_origin: Vec<f64>,
    pub position: Vec<f64>,
    pub gcode_position: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Toolhead {
    pub homed_axes: String,
    pub print_time: f64,
    pub estimated_print_time: f64,
    pub extruder: String,
    pub position: Vec<f64>,
    pub max_velocity: f64,
    pub max_accel: f64,
    pub max_accel_to_decel: f64,
    pub square_corner_velocity: f64,
}

/// Parsed printer configuration. Section contents are left untyped.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub config: BTreeMap<String, Value>,
    pub settings: BTreeMap<String, Value>,
    pub save_config_pending: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Extruder {
    pub temperature: f64,
    pub target: f64,
    pub power: f64,
    pub pressure_advance: f64,
    pub smooth_time: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaterBed {
    pub temperature: f64,
    pub target: f64,
    pub power: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Fan {
    pub speed: f64,
    pub rpm: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdleTimeout {
    pub state: String,
    pub printing_time: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VirtualSdcard {
    pub progress: f64,
    pub is_active: bool,
    pub file_position: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrintStats {
    pub filename: String,
    pub total_duration: f64,
    pub print_duration: f64,
    pub filament_used: f64,
    pub state: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayStatus {
    pub message: Option<String>,
    pub progress: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BedMesh {
    pub profile_name: String,
    pub mesh_min: Vec<f64>,
    pub mesh_max: Vec<f64>,
    pub probed_matrix: Vec<Vec<f64>>,
    pub mesh_matrix: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct ObjectList {
    objects: Vec<String>,
}

impl MoonrakerClient {
    /// Names of every object Klipper currently exposes.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn list_objects(&self) -> Result<Vec<String>> {
        let list: ObjectList = self.session().call("printer.objects.list", ()).await?;
        Ok(list.objects)
    }

    /// Current values of the objects named by `query`.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call, including
    /// [`crate::RpcError::Decode`] if the status does not match `T`.
    pub async fn query_objects<T: DeserializeOwned>(
        &self,
        query: &ObjectQuery,
    ) -> Result<ObjectStatus<T>> {
        self.session().call("printer.objects.query", query).await
    }

    /// Subscribe to changes of the objects named by `query`.
    ///
    /// Replaces any earlier subscription on this connection. The result
    /// carries the current values; later changes arrive as
    /// `notify_status_update` notifications.
    ///
    /// # Errors
    ///
    /// As [`MoonrakerClient::query_objects`].
    pub async fn subscribe_objects<T: DeserializeOwned>(
        &self,
        query: &ObjectQuery,
    ) -> Result<ObjectStatus<T>> {
        self.session().call("printer.objects.subscribe", query).await
    }
}
