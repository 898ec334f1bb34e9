//! Manual recipe for when the automation utility is absent.

use std::path::Path;

use remote_bootstrap_core::Endpoint;

/// Render the copy-then-run recipe the operator can follow by hand. Pure,
/// so the missing-utility path never touches the network.
#[must_use]
pub fn manual_instructions(endpoint: &Endpoint, script_path: &Path) -> String {
    let banner = "=".repeat(60);
    let destination = endpoint.destination();
    let script = script_path.display();
    let name = script_path
        .file_name()
        .map_or_else(|| script_path.to_string_lossy(), |name| name.to_string_lossy());

    format!(
        "expect not found. Falling back to manual instructions.\n\
         \n\
         {banner}\n\
         Please run this command manually:\n\
         {banner}\n\
         \n\
         scp {script} {destination}:/tmp/\n\
         \n\
         ssh {destination}\n\
         chmod +x /tmp/{name}\n\
         /tmp/{name}\n\
         \n\
         {banner}\n"
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_recipe_names_the_host() {
        let endpoint = Endpoint::new("203.0.113.7", "root", "hunter2");
        let recipe = manual_instructions(&endpoint, &PathBuf::from("infra/setup-on-server.sh"));
        assert!(recipe.contains("203.0.113.7"));
        assert!(recipe.contains("scp infra/setup-on-server.sh root@203.0.113.7:/tmp/"));
        assert!(recipe.contains("chmod +x /tmp/setup-on-server.sh"));
        assert!(recipe.contains("/tmp/setup-on-server.sh\n"));
    }

    #[test]
    fn test_recipe_never_contains_the_password() {
        let endpoint = Endpoint::new("203.0.113.7", "root", "hunter2");
        let recipe = manual_instructions(&endpoint, &PathBuf::from("setup-on-server.sh"));
        assert!(!recipe.contains("hunter2"));
    }
}
