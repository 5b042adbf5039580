pub mod file;
pub mod stdin;

use bizplan_core::PlanInput;

/// Plan document from `--input`, or from piped stdin when no path is given.
pub fn load_plan_input(path: Option<&str>) -> Result<PlanInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_document(path);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err("--input <plan.json|plan.yaml> or stdin required".into()),
    }
}
