//! Structure used to pass live configuration changes into the engine
//!
//! The engine polls a mpsc Receiver for these once per frame, so there is
//! exactly one writer to engine state even though the settings UI runs
//! elsewhere.
use num::{FromPrimitive, ToPrimitive};
use serde_json::json;
use simple_error::bail;
use std::fmt;

use crate::common::box_error::BoxError;

#[derive(FromPrimitive, ToPrimitive, PartialEq, Debug)]
pub enum EngineParam {
    SetSensitivity = 0,
    SetGain,
    SetCompressorThreshold,
    SetCompressorRatio,
    SetDevice,
}

pub struct ParamMessage {
    pub param: EngineParam,
    pub fvalue: f64,
    pub svalue: String,
}

impl ParamMessage {
    pub fn new(param: EngineParam, fval: f64, sval: &str) -> ParamMessage {
        ParamMessage {
            param: param,
            fvalue: fval,
            svalue: String::from(sval),
        }
    }
    pub fn as_json(&self) -> serde_json::Value {
        json!({
          "param": self.param.to_usize(),
          "fValue": self.fvalue,
          "sValue": self.svalue,
        })
    }
    pub fn from_string(data: &str) -> Result<ParamMessage, BoxError> {
        let raw = serde_json::from_str(data)?;
        Self::from_json(&raw)
    }
    pub fn from_json(raw: &serde_json::Value) -> Result<ParamMessage, BoxError> {
        if !raw["param"].is_i64() {
            bail!("no param in message");
        }
        let param = EngineParam::from_i64(raw["param"].as_i64().unwrap());
        if param.is_none() {
            bail!("unknown param value");
        }
        let mut msg = ParamMessage::new(param.unwrap(), 0.0, "");
        if raw["fValue"].is_f64() {
            msg.fvalue = raw["fValue"].as_f64().unwrap();
        }
        if raw["fValue"].is_i64() {
            msg.fvalue = raw["fValue"].as_i64().unwrap() as f64;
        }
        if raw["fValue"].is_string() {
            msg.fvalue = str::parse(raw["fValue"].as_str().unwrap())?;
        }
        if raw["sValue"].is_string() {
            msg.svalue = String::from(raw["sValue"].as_str().unwrap());
        }
        Ok(msg)
    }
}

impl fmt::Display for ParamMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ param: {:?}, fval: {} sval: {} }}",
            self.param, self.fvalue, self.svalue
        )
    }
}
