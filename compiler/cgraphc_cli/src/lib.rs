//! A thin driver that wires the toy text front-end ([`front_end::TextFrontEnd`]) into
//! [`cgraphc`]'s callgraph core, for manual inspection and end-to-end testing of the library.
//! The binary (`src/main.rs`) is a clap-based shell around [`run`]; the parsing and front-end
//! logic lives here so it can be exercised directly by integration tests without spawning a
//! subprocess.

pub mod front_end;
pub mod parser;

use cgraphc::{Context, DriverConfig, IceError, Mode};
use front_end::TextFrontEnd;

/// One surviving function's summary, for [`RunReport`].
#[derive(Debug, Clone)]
pub struct SurvivingFunction {
    pub name: String,
    pub public: bool,
    pub output_was_set: bool,
}

/// What [`run`] found after driving a program through to quiescence.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Names of functions still present in the callgraph after reclamation, in insertion order.
    pub surviving_functions: Vec<String>,
    /// Names of variables still present after reclamation, in insertion order.
    pub surviving_variables: Vec<String>,
    /// Names in the order [`cgraphc::front_end::FrontEnd::expand_function`] was invoked —
    /// reverse-postorder for whole-unit mode, finalize order for streaming mode.
    pub emission_order: Vec<String>,
    pub collection_points: u32,
}

/// Parses `source`, installs every item into a fresh [`Context`], drives it to quiescence under
/// `config`, and summarizes the result. This is the whole of what the `cgraphc` binary does;
/// factored out so integration tests can call it directly.
pub fn run(source: &str, config: DriverConfig) -> Result<RunReport, IceError> {
    let program = parser::parse(source).map_err(|e| IceError::FrontEnd(e.to_string()))?;
    let has_ctor_dtor_sections = false;
    let fe = TextFrontEnd::new(has_ctor_dtor_sections);
    let mut ctx = Context::new(fe, config);

    front_end::install_and_finalize(&mut ctx, &program)?;

    match ctx.mode() {
        Mode::WholeUnit => {
            cgraphc::driver::finalize_compilation_unit(&mut ctx)?;
            cgraphc::driver::optimize(&mut ctx)?;
        }
        Mode::Streaming => {
            cgraphc::driver::finalize_compilation_unit(&mut ctx)?;
        }
    }

    let surviving_functions = ctx
        .store()
        .function_ids()
        .map(|id| ctx.front_end().name_of(ctx.store().function(id).decl))
        .collect();
    let surviving_variables = ctx
        .store()
        .variable_ids()
        .map(|id| ctx.front_end().name_of(ctx.store().variable(id).decl))
        .collect();
    let emission_order = ctx
        .front_end()
        .expanded()
        .into_iter()
        .map(|sym| ctx.front_end().name_of(sym))
        .collect();

    Ok(RunReport {
        surviving_functions,
        surviving_variables,
        emission_order,
        collection_points: ctx.front_end().collection_points(),
    })
}
