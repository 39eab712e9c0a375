// ServeSense - Tennis Serve Classifier Core
//
// Capture -> quantize -> infer -> decide -> feedback pipeline for the Xiao
// ESP32-S3 wearable.  Everything except `drivers` is hardware-independent and
// runs on the host.

pub mod capture;
pub mod config;
pub mod controller;
pub mod decision;
pub mod events;
pub mod feedback;
pub mod input;
pub mod model;
pub mod quantize;
pub mod tasks;
pub mod telemetry;

#[cfg(target_os = "espidf")]
pub mod drivers;
