/// The xtask binary delegates entirely to nih_plug_xtask, which provides
/// the `bundle` subcommand. Usage:
///
///   cargo xtask bundle cross-ddl --release
///
/// This compiles the plugin as a cdylib and packages it into
/// `target/bundled/Cross DDL.vst3` and `target/bundled/Cross DDL.clap`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
