pub const RIBOSTRUCT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const RIBOSTRUCT_BUILD_N: &str = env!("RIBOSTRUCT_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "ribostruct {}\nBuild {}\nRNA annotation overlay and structural coordinate engine",
        RIBOSTRUCT_VERSION, RIBOSTRUCT_BUILD_N
    )
}
