//! Printer administration and print job control.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::json;

use super::MoonrakerClient;
use crate::error::Result;

/// Klippy host state as reported by `printer.info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrinterInfo {
    /// `ready`, `startup`, `shutdown` or `error`.
    pub state: String,
    pub state_message: String,
    pub hostname: String,
    pub software_version: String,
    pub cpu_info: String,
    pub klipper_path: String,
    pub python_path: String,
    pub log_file: String,
    pub config_file: String,
}

/// Endstop states keyed by axis, e.g. `x` → `TRIGGERED` or `open`.
pub type Endstops = BTreeMap<String, String>;

impl MoonrakerClient {
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn printer_info(&self) -> Result<PrinterInfo> {
        self.session().call("printer.info", ()).await
    }

    /// Halt the printer immediately; Klipper enters its shutdown state.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn emergency_stop(&self) -> Result<()> {
        self.session()
            .call_discard("printer.emergency_stop", ())
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn firmware_restart(&self) -> Result<()> {
        self.session()
            .call_discard("printer.firmware_restart", ())
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn query_endstops(&self) -> Result<Endstops> {
        self.session()
            .call("printer.query_endstops.status", ())
            .await
    }

    /// Run a G-code script; completes once Klipper has processed it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RpcError::Remote`] if Klipper rejects the script.
    pub async fn run_gcode(&self, script: &str) -> Result<()> {
        self.session()
            .call_discard("printer.gcode.script", json!({ "script": script }))
            .await
    }

    /// Registered G-code commands and their descriptions.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn gcode_help(&self) -> Result<BTreeMap<String, String>> {
        self.session().call("printer.gcode.help", ()).await
    }

    /// Start printing `filename`, relative to the `gcodes` root.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn start_print(&self, filename: &str) -> Result<()> {
        self.session()
            .call_discard("printer.print.start", json!({ "filename": filename }))
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn pause_print(&self) -> Result<()> {
        self.session().call_discard("printer.print.pause", ()).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn resume_print(&self) -> Result<()> {
        self.session().call_discard("printer.print.resume", ()).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn cancel_print(&self) -> Result<()> {
        self.session().call_discard("printer.print.cancel", ()).await
    }
}
