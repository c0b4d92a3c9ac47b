//! Ordered line producers for the control script.
//!
//! The interactive tool reads its input positionally, so the order of
//! `STAGES` is the protocol. Each stage looks at the configuration and returns
//! zero or more lines; none of them reorders or inspects another's output.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{CompileError, ValidationError};
use crate::params::ModelConfiguration;

/// Spectrum used when no custom spectrum file is configured.
pub const DEFAULT_SPECTRUM: &str = "Q/inputs/cont_a05t23isp_vm802.spectrum  : default spectrum";

/// One line of the control script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A selector or yes/no answer, with its trailing annotation.
    Command(Cow<'static, str>),
    /// A file path or a formatted value.
    Data(String),
}

impl Line {
    pub fn text(&self) -> &str {
        match self {
            Line::Command(s) => s,
            Line::Data(s) => s,
        }
    }

    fn cmd(s: &'static str) -> Line {
        Line::Command(Cow::Borrowed(s))
    }

    fn path(p: &Path) -> Line {
        Line::Data(p.display().to_string())
    }
}

/// Inputs available to every stage.
pub struct RenderContext<'a> {
    pub config: &'a ModelConfiguration,
    pub id: &'a str,
}

pub type Stage = fn(&RenderContext<'_>) -> Result<Vec<Line>, CompileError>;

pub const STAGES: &[(&str, Stage)] = &[
    ("abundance", abundance),
    ("offsets", offsets),
    ("dust", dust),
    ("model_family", model_family),
    ("spectrum", spectrum),
    ("age", age),
    ("geometry", geometry),
    ("luminosity", luminosity),
    ("pressure", pressure),
    ("inner_radius", inner_radius),
    ("integration", integration),
    ("step_size", step_size),
    ("termination", termination),
    ("identifier", identifier),
    ("end", end),
];

fn yes_no(flag: bool, yes: &'static str, no: &'static str) -> Line {
    Line::cmd(if flag { yes } else { no })
}

fn abundance(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(match ctx.config.abundance_file() {
        Some(path) => vec![
            Line::cmd("yes   : change abundance"),
            Line::path(path),
            Line::cmd("no    : no more changes"),
        ],
        None => vec![Line::cmd("no    : use default abundance")],
    })
}

fn offsets(_: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![Line::cmd("no    : no offsets")])
}

fn dust(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    let dust = ctx.config.dust();
    if !dust.enabled {
        return Ok(vec![Line::cmd("no    : include dust")]);
    }
    if dust.depletion_file.is_none() {
        return Err(ValidationError::MissingRequiredField {
            field: "dust.depletion_file",
        }
        .into());
    }

    let mut lines = vec![Line::cmd("yes   : include dust")];

    match ctx.config.depletion_file() {
        Some(path) => lines.extend([
            Line::cmd("yes   : change depletions"),
            Line::path(path),
            Line::cmd("no    : no more changes"),
        ]),
        None => lines.push(Line::cmd("no    : use default depletions")),
    }

    lines.push(yes_no(
        dust.allow_grain_destruction,
        "yes   : allow grain destruction",
        "no    : allow grain destruction",
    ));

    let distribution = dust
        .grain_distribution
        .protocol_line()
        .ok_or(CompileError::UnrenderableGrainDistribution(dust.grain_distribution))?;
    lines.push(Line::cmd(distribution));

    lines.extend([
        Line::cmd("yes   : Include PAH molecules?"),
        Line::Data(format!(
            "{}   : fraction of Carbon Dust Depletion in PAHs",
            dust.pah_fraction
        )),
        Line::cmd("Q     : PAH switch on QHDH < Value"),
        Line::Data(format!("{}   : PAH switch on Value", dust.pah_switch_value)),
        yes_no(
            dust.graphite_cospatial,
            "yes   : graphite grains to be cospatial with PAHs",
            "no    : graphite grains to be cospatial with PAHs",
        ),
        yes_no(
            dust.eval_temperature,
            "yes   : Evaluate dust temperatures and IR flux?",
            "no    : Evaluate dust temperatures and IR flux?",
        ),
    ]);

    Ok(lines)
}

fn model_family(_: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::cmd("P6    : the main Mappings model to use"),
        Line::cmd("D     : Default ionisation values"),
        Line::cmd("H     : Input spectral energy distribution data (usually Starburst99)"),
    ])
}

fn spectrum(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![match ctx.config.spectrum_file() {
        Some(path) => Line::path(path),
        None => Line::Data(DEFAULT_SPECTRUM.to_string()),
    }])
}

fn age(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::Data(format!(
            "{}     : Age of the HII region. Age = (n-1)*0.5 Myr",
            ctx.config.age_index()
        )),
        Line::cmd("X     : eXit with current source"),
    ])
}

fn geometry(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    let geometry = ctx.config.geometry();
    Ok(vec![Line::Command(Cow::Owned(format!(
        "{}     : {}. (For Plane parallel, 'P', different options)",
        geometry.code(),
        geometry.description()
    )))])
}

fn luminosity(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::cmd("L     : Source by Luminosity"),
        Line::cmd("T     : Total or Ionising Luminosity"),
        Line::Data(format!(
            "{}    : bolometric source luminosity (log erg/s)",
            ctx.config.log_luminosity()
        )),
    ])
}

fn pressure(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    let c = ctx.config;
    Ok(vec![
        Line::cmd("B     : isoBaric, (const pressure)"),
        Line::Data(format!("{} :  Pressure regime (p/k, <10 as log)", c.log_pressure())),
        Line::Data(format!("{}     : log(Initial temperature)", c.log_temperature())),
        Line::Data(format!("{}     : filling factor (0<f<=1)", c.filling_factor())),
    ])
}

fn inner_radius(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::cmd("q     : Give initial radius in terms of distance or Q(N) (d/q) ***nb old  options"),
        Line::Data(format!(
            "{} :   Q at inner radius (< 100 as log)",
            ctx.config.log_ionization()
        )),
    ])
}

fn integration(_: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::cmd("y     : Volume integration over the whole sphere? (y/n)"),
        Line::cmd("E     : Equilibrium ionization balance."),
    ])
}

fn step_size(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![Line::Data(format!(
        "{}  : Step value of the photon absorption fraction  *******",
        ctx.config.step_size()
    ))])
}

fn termination(_: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![
        Line::cmd("A     : Ionisation bounded, 99% neutral **********"),
        Line::cmd("A   : Standard output"),
    ])
}

fn identifier(ctx: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![Line::Data(format!("{} : ID string", ctx.id))])
}

fn end(_: &RenderContext<'_>) -> Result<Vec<Line>, CompileError> {
    Ok(vec![Line::cmd("X   : end model")])
}
