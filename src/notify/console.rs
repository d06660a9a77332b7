//! Colored console output for check results.

use crate::types::ProjectIdentity;
use colored::Colorize;

/// Console output handler with colors and formatting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new() -> Self {
        Self
    }

    /// Print check start message.
    pub fn print_start(&self) {
        println!("{}", "Checking if package version already exists...".cyan());
    }

    /// Print the project being checked.
    pub fn print_project(&self, project: &ProjectIdentity) {
        println!("{}", format_project(project).cyan());
    }

    /// Print the success line.
    pub fn print_not_found(&self, project: &ProjectIdentity) {
        println!("{}", format_not_found(project).green());
    }
}

fn format_project(project: &ProjectIdentity) -> String {
    format!("Package name: {}, version: {}", project.name, project.version)
}

fn format_not_found(project: &ProjectIdentity) -> String {
    format!("{}=={} does not exist in the index", project.name, project.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let project = ProjectIdentity {
            name: "version-two-project-name".to_string(),
            version: "2.0.1".to_string(),
        };

        assert_eq!(
            format_project(&project),
            "Package name: version-two-project-name, version: 2.0.1"
        );
        assert_eq!(
            format_not_found(&project),
            "version-two-project-name==2.0.1 does not exist in the index"
        );
    }
}
