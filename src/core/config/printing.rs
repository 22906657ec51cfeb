use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset, using {})", self.base_url()),
        }
        match &self.generate_path {
            Some(path) => println!("  generate-path: {path}"),
            None => println!("  generate-path: (unset)"),
        }
        println!("  endpoint: {}", self.endpoint());
        match &self.api_key_env {
            Some(var) => println!("  api-key-env: {var}"),
            None => println!("  api-key-env: (unset, using {})", self.api_key_env()),
        }
        match &self.archive_name {
            Some(name) => println!("  archive-name: {name}"),
            None => println!("  archive-name: (unset, using {})", self.archive_name()),
        }
        match &self.state_dir {
            Some(dir) => println!("  state-dir: {}", path_display(dir)),
            None => match self.resolve_state_dir() {
                Ok(dir) => println!("  state-dir: (unset, using {})", path_display(dir)),
                Err(_) => println!("  state-dir: (unset)"),
            },
        }
    }
}
