use clap::{arg, crate_version, Command};

type DYNERR = Box<dyn std::error::Error>;

fn main() -> Result<(), DYNERR> {
    env_logger::init();

    let long_help = "Examples:
---------
Compress:  `hzr encode -i my_input -o my_input.hzr`
Verify:    `hzr verify -i my_input.hzr`
Expand:    `hzr decode -i my_input.hzr -o my_restored`";

    let mut main_cmd = Command::new("hzr")
        .about("Compress and expand with the HZR codec")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("encode")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .about("compress a file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("decode")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .about("expand a file, trusting its structure"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("verify")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .about("check a compressed file's integrity without expanding it"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("encode") {
        let path_in = cmd.get_one::<String>("input").expect("clap required arg");
        let path_out = cmd.get_one::<String>("output").expect("clap required arg");
        let input = std::fs::read(path_in)?;
        let cap = hzr::max_compressed_size(input.len() as u64) as usize;
        let mut output = vec![0u8; cap];
        let written = hzr::encode(&input, &mut output)?;
        output.truncate(written);
        std::fs::write(path_out, output)?;
        log::info!("encoded {} byte(s) into {} byte(s)", input.len(), written);
    }

    if let Some(cmd) = matches.subcommand_matches("decode") {
        let path_in = cmd.get_one::<String>("input").expect("clap required arg");
        let path_out = cmd.get_one::<String>("output").expect("clap required arg");
        let input = std::fs::read(path_in)?;
        let decoded_size = hzr::verify(&input)?;
        let mut output = vec![0u8; decoded_size as usize];
        hzr::decode(&input, &mut output)?;
        std::fs::write(path_out, output)?;
        log::info!("decoded into {} byte(s)", decoded_size);
    }

    if let Some(cmd) = matches.subcommand_matches("verify") {
        let path_in = cmd.get_one::<String>("input").expect("clap required arg");
        let input = std::fs::read(path_in)?;
        let decoded_size = hzr::verify(&input)?;
        println!("ok: {} byte(s) decoded size", decoded_size);
    }

    Ok(())
}
