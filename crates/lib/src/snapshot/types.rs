//! Topology entities as reported by the metadata provider.
//!
//! Only the fields templates commonly reach for are typed. Everything else the
//! provider sends is kept in `extra` (key-sorted) and flattened back out on
//! serialization, so templates can still reference it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named group of services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stack {
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub environment_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub environment_uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub system: bool,
  #[serde(deserialize_with = "null_as_default")]
  pub services: Vec<Service>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// A service within a stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub stack_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub stack_uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub kind: String,
  #[serde(deserialize_with = "null_as_default")]
  pub hostname: String,
  #[serde(deserialize_with = "null_as_default")]
  pub vip: String,
  #[serde(deserialize_with = "null_as_default")]
  pub fqdn: String,
  #[serde(deserialize_with = "null_as_default")]
  pub state: String,
  #[serde(deserialize_with = "null_as_default")]
  pub create_index: i64,
  #[serde(deserialize_with = "null_as_default")]
  pub scale: i64,
  #[serde(deserialize_with = "null_as_default")]
  pub external_ips: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub sidekicks: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub ports: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub labels: BTreeMap<String, String>,
  #[serde(deserialize_with = "null_as_default")]
  pub links: BTreeMap<String, String>,
  #[serde(deserialize_with = "null_as_default")]
  pub metadata: BTreeMap<String, Value>,
  #[serde(deserialize_with = "null_as_default")]
  pub containers: Vec<Container>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// A container backing a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub primary_ip: String,
  #[serde(deserialize_with = "null_as_default")]
  pub ips: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub ports: Vec<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub service_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub stack_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub host_uuid: String,
  #[serde(deserialize_with = "null_as_default")]
  pub state: String,
  #[serde(deserialize_with = "null_as_default")]
  pub health_state: String,
  #[serde(deserialize_with = "null_as_default")]
  pub create_index: i64,
  #[serde(deserialize_with = "null_as_default")]
  pub service_index: String,
  #[serde(deserialize_with = "null_as_default")]
  pub start_count: i64,
  #[serde(deserialize_with = "null_as_default")]
  pub labels: BTreeMap<String, String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}
