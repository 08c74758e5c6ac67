//! Parameter-update protocol
//!
//! Operators tune the controller with `key=value` pairs separated by `&`.
//! Each pair is parsed independently so one malformed entry does not
//! discard the others. There is no authentication: the last writer wins.
//!
//! | Key        | Value                     | Update                         |
//! |------------|---------------------------|--------------------------------|
//! | `p`        | float                     | [`ParamUpdate::Kp`]            |
//! | `i`        | float                     | [`ParamUpdate::Ki`]            |
//! | `d`        | float                     | [`ParamUpdate::Kd`]            |
//! | `pump`     | `toggle`                  | [`ParamUpdate::TogglePump`]    |
//! | `heater`   | `toggle`                  | [`ParamUpdate::ToggleHeater`]  |
//! | `heating`  | `toggle`                  | [`ParamUpdate::ToggleHeating`] |
//! | `stage`    | `start`/`complete`/`abort`/`ack` | [`ParamUpdate::Stage`]  |
//! | `mash`     | `<°C>:<s>,<°C>:<s>,...`   | [`ParamUpdate::Mash`]          |
//! | `limits`   | `<min>,<max>`             | [`ParamUpdate::OutputLimits`]  |
//! | `mode`     | `auto`/`manual`           | [`ParamUpdate::AutoMode`]      |
//! | `target`   | float                     | [`ParamUpdate::Target`]        |
//! | `offset`   | float                     | [`ParamUpdate::CalibrationOffset`] |
//! | `autotune` | `<amplitude>,<cycles>`    | [`ParamUpdate::Autotune`]      |
//! | `shutdown` | `now`                     | [`ParamUpdate::Shutdown`]      |

use heapless::Vec;

/// Maximum rests in one `mash=` program
pub const MAX_MASH_RESTS: usize = 8;

/// One rest of a `mash=` program
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MashRest {
    /// Rest temperature (°C)
    pub target_c: f32,
    /// Hold time once at temperature (seconds)
    pub hold_s: u32,
}

/// Operator stage commands (`stage=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageCommand {
    /// Start a manual heating run
    Start,
    /// Mark the manual run complete
    Complete,
    /// Stop the current run or mash program
    Abort,
    /// Acknowledge a latched fault
    Acknowledge,
}

/// A single decoded parameter update
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamUpdate {
    /// Overwrite the proportional gain
    Kp(f32),
    /// Overwrite the integral gain
    Ki(f32),
    /// Overwrite the derivative gain
    Kd(f32),
    /// Flip the pump output
    TogglePump,
    /// Flip the heater enable flag
    ToggleHeater,
    /// Arm or disarm heating
    ToggleHeating,
    /// Drive the stage machine
    Stage(StageCommand),
    /// Start a mash program with these rests
    Mash(Vec<MashRest, MAX_MASH_RESTS>),
    /// New PID output clamp
    OutputLimits { min: f32, max: f32 },
    /// PID auto (`true`) or manual output hold (`false`)
    AutoMode(bool),
    /// New target temperature (°C)
    Target(f32),
    /// New sensor calibration offset (°C)
    CalibrationOffset(f32),
    /// Start a relay autotune
    Autotune {
        /// Relay band around the current setpoint (°C)
        relay_amplitude: f32,
        /// Full oscillation cycles to observe
        cycles: u8,
    },
    /// Graceful shutdown: outputs off, heater latched disabled
    Shutdown,
}

/// Errors decoding a parameter pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamError {
    /// Pair had no `=` or an empty value
    MissingValue,
    /// Key is not part of the protocol
    UnknownKey,
    /// Value is not a finite number
    InvalidNumber,
    /// Action keyword not recognized (e.g. `pump=on`)
    InvalidAction,
    /// Lower bound not below the upper bound
    InvalidRange,
    /// More than [`MAX_MASH_RESTS`] rests
    TooManyRests,
}

/// Parse one `key=value` pair
pub fn parse_pair(pair: &str) -> Result<ParamUpdate, ParamError> {
    let (key, value) = pair.split_once('=').ok_or(ParamError::MissingValue)?;
    let key = key.trim();
    let value = value.trim();

    if value.is_empty() {
        return Err(ParamError::MissingValue);
    }

    match key {
        "p" => parse_float(value).map(ParamUpdate::Kp),
        "i" => parse_float(value).map(ParamUpdate::Ki),
        "d" => parse_float(value).map(ParamUpdate::Kd),
        "target" => parse_float(value).map(ParamUpdate::Target),
        "offset" => parse_float(value).map(ParamUpdate::CalibrationOffset),
        "pump" => expect_action(value, "toggle").map(|_| ParamUpdate::TogglePump),
        "heater" => expect_action(value, "toggle").map(|_| ParamUpdate::ToggleHeater),
        "heating" => expect_action(value, "toggle").map(|_| ParamUpdate::ToggleHeating),
        "stage" => parse_stage(value).map(ParamUpdate::Stage),
        "mash" => parse_mash(value).map(ParamUpdate::Mash),
        "limits" => parse_limits(value),
        "mode" => match value {
            "auto" => Ok(ParamUpdate::AutoMode(true)),
            "manual" => Ok(ParamUpdate::AutoMode(false)),
            _ => Err(ParamError::InvalidAction),
        },
        "shutdown" => expect_action(value, "now").map(|_| ParamUpdate::Shutdown),
        "autotune" => parse_autotune(value),
        _ => Err(ParamError::UnknownKey),
    }
}

fn parse_float(value: &str) -> Result<f32, ParamError> {
    let parsed: f32 = value.parse().map_err(|_| ParamError::InvalidNumber)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ParamError::InvalidNumber)
    }
}

fn expect_action(value: &str, action: &str) -> Result<(), ParamError> {
    if value == action {
        Ok(())
    } else {
        Err(ParamError::InvalidAction)
    }
}

fn parse_autotune(value: &str) -> Result<ParamUpdate, ParamError> {
    let (amplitude, cycles) = value.split_once(',').ok_or(ParamError::MissingValue)?;
    let relay_amplitude = parse_float(amplitude.trim())?;
    let cycles: u8 = cycles
        .trim()
        .parse()
        .map_err(|_| ParamError::InvalidNumber)?;

    Ok(ParamUpdate::Autotune {
        relay_amplitude,
        cycles,
    })
}

fn parse_stage(value: &str) -> Result<StageCommand, ParamError> {
    match value {
        "start" => Ok(StageCommand::Start),
        "complete" => Ok(StageCommand::Complete),
        "abort" => Ok(StageCommand::Abort),
        "ack" => Ok(StageCommand::Acknowledge),
        _ => Err(ParamError::InvalidAction),
    }
}

fn parse_mash(value: &str) -> Result<Vec<MashRest, MAX_MASH_RESTS>, ParamError> {
    let mut rests = Vec::new();
    for rest in value.split(',') {
        let (target, hold) = rest.split_once(':').ok_or(ParamError::MissingValue)?;
        let rest = MashRest {
            target_c: parse_float(target.trim())?,
            hold_s: hold.trim().parse().map_err(|_| ParamError::InvalidNumber)?,
        };
        rests.push(rest).map_err(|_| ParamError::TooManyRests)?;
    }
    Ok(rests)
}

fn parse_limits(value: &str) -> Result<ParamUpdate, ParamError> {
    let (min, max) = value.split_once(',').ok_or(ParamError::MissingValue)?;
    let min = parse_float(min.trim())?;
    let max = parse_float(max.trim())?;
    if min >= max {
        return Err(ParamError::InvalidRange);
    }
    Ok(ParamUpdate::OutputLimits { min, max })
}

/// Iterator over the pairs of a parameter string
///
/// Accepts an optional leading `?` and ignores empty segments and
/// surrounding whitespace (so a raw serial line can be passed directly).
pub struct Params<'a> {
    pairs: core::str::Split<'a, char>,
}

impl<'a> Params<'a> {
    /// Start iterating over `query`
    pub fn new(query: &'a str) -> Self {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: query.split('&'),
        }
    }
}

impl<'a> Iterator for Params<'a> {
    type Item = Result<ParamUpdate, ParamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let pair = self.pairs.next()?;
            if pair.trim().is_empty() {
                continue;
            }
            return Some(parse_pair(pair));
        }
    }
}
