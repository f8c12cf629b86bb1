use argh::FromArgs;
use std::sync::LazyLock;

fn shadow_map_size(size: &str) -> Result<u32, String> {
    if size == "off" {
        return Ok(0);
    }

    let size: u32 = size
        .parse()
        .map_err(|_| format!("'{size}' is not a valid shadow map size"))?;

    if size != 0 && !size.is_power_of_two() {
        return Err(format!("shadow map size {size} is not a power of two"));
    }

    Ok(size)
}

/// Engine arguments
#[derive(Debug, Default, FromArgs)]
pub struct EngineArgs {
    #[argh(switch, hidden_help)]
    pub no_shadows: bool,

    #[argh(option, hidden_help, from_str_fn(shadow_map_size))]
    pub shadow_map_size: Option<u32>,
    #[argh(option, hidden_help)]
    pub max_lights: Option<usize>,
}

impl EngineArgs {
    fn init() -> Option<EngineArgs> {
        let mut args = std::env::args();
        let cmd_name = args.next()?;
        let args: Vec<String> = args.collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        EngineArgs::from_args(&[&cmd_name], &args).ok()
    }

    pub fn get() -> &'static EngineArgs {
        static INSTANCE: LazyLock<EngineArgs> =
            LazyLock::new(|| EngineArgs::init().unwrap_or_default());
        &INSTANCE
    }

    /// The shadow atlas size after applying `--no-shadows` and `--shadow-map-size`.
    pub fn shadow_map_size_or(&self, default: u32) -> u32 {
        if self.no_shadows {
            return 0;
        }
        self.shadow_map_size.unwrap_or(default)
    }
}
