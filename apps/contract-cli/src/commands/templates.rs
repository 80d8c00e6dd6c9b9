use anyhow::Result;
use clap::Args;
use contract_generator::builtin_templates;

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Print the full templates as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn templates(args: TemplatesArgs) -> Result<()> {
    let templates = builtin_templates();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    for template in &templates {
        println!(
            "{:<20} {:<28} [{}] {}",
            template.id, template.name, template.category, template.description
        );
    }
    Ok(())
}
