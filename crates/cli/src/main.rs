use admission_core::record::AdmissionStatus;
use admission_core::schema::{FieldPath, FormDraft, StudentType};
use admission_core::status::Badge;
use admission_core::steps::{Advance, Step, StepNavigator};
use admission_core::validation::{validate_step, ValidationErrors};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "admission")]
#[command(about = "School admission portal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the form steps and the fields each one owns
    Steps,
    /// Walk the step gates over a JSON draft (file bytes base64-encoded)
    Validate {
        /// Path to the draft JSON
        draft: PathBuf,
        /// Check only this step (1-based)
        #[arg(long)]
        step: Option<usize>,
    },
    /// Print every admission status with its dashboard badge
    Statuses,
    /// Print the requirements and enrollment procedure for a student type
    Requirements {
        /// new, returning or transferee
        student_type: String,
    },
}

fn print_errors(step: Step, errors: &ValidationErrors<FieldPath>) {
    println!("{} ({}) is incomplete:", step.id(), step.title());
    for error in errors.iter() {
        println!("  {}: {}", error.field, error.kind);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Steps) => {
            for step in Step::ALL {
                println!("{}: {}", step.id(), step.title());
                for field in step.fields() {
                    println!("  {field}");
                }
            }
        }
        Some(Commands::Validate { draft, step }) => {
            let text = std::fs::read_to_string(&draft)?;
            let mut draft: FormDraft = serde_json::from_str(&text)?;
            draft.sanitize();

            if let Some(number) = step {
                let step = number
                    .checked_sub(1)
                    .and_then(Step::from_index)
                    .ok_or_else(|| format!("no step {number}; steps are 1 to {}", Step::ALL.len()))?;
                match validate_step(&draft, step) {
                    Ok(()) => println!("{} ({}) is complete", step.id(), step.title()),
                    Err(errors) => print_errors(step, &errors),
                }
                return Ok(());
            }

            let mut navigator = StepNavigator::new();
            loop {
                let current = navigator.current();
                match navigator.advance(&draft) {
                    Advance::Moved { .. } => continue,
                    Advance::Blocked(errors) => {
                        print_errors(current, &errors);
                        break;
                    }
                    Advance::Submit(_) => {
                        println!("ready to submit");
                        break;
                    }
                }
            }
        }
        Some(Commands::Statuses) => {
            for status in AdmissionStatus::ALL {
                let badge = Badge::for_known(status);
                let terminal = if status.is_terminal() { " (final)" } else { "" };
                println!(
                    "{:<20} {:<24} {:?}{}",
                    status.as_str(),
                    badge.label,
                    badge.variant,
                    terminal
                );
            }
        }
        Some(Commands::Requirements { student_type }) => {
            let student_type = StudentType::parse(&student_type).ok_or_else(|| {
                format!("unknown student type '{student_type}'; expected new, returning or transferee")
            })?;
            println!("Requirements for {student_type} students:");
            for item in student_type.requirements() {
                println!("  - {item}");
            }
            println!("Enrollment procedure:");
            for (number, step) in student_type.enrollment_procedure().iter().enumerate() {
                println!("  {}. {step}", number + 1);
            }
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}
