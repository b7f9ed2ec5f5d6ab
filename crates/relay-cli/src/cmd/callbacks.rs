use crate::output::{print_json, print_table};
use relay_core::registry::CallbackRegistry;

pub fn run(json: bool) -> anyhow::Result<()> {
    let registry = CallbackRegistry::with_defaults();
    let names = registry.names();
    if json {
        print_json(&names)?;
    } else {
        print_table(
            &["CALLBACK"],
            names.into_iter().map(|n| vec![n]).collect(),
        );
    }
    Ok(())
}
