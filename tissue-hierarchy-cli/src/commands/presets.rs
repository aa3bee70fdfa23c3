use crate::config;
use crate::error::CliResult;
use tissue_hierarchy::HierarchyConfig;

pub fn run(name: Option<&str>) -> CliResult<()> {
    let names: Vec<&str> = match name {
        Some(n) => vec![n],
        None => HierarchyConfig::PRESETS.to_vec(),
    };

    for (i, name) in names.iter().enumerate() {
        let preset = config::preset(name)?;
        if i > 0 {
            println!();
        }
        println!("# preset: {name}");
        print!("{}", preset.to_toml_string()?);
    }
    Ok(())
}
