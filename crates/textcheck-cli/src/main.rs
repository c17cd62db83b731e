mod args;
mod dump;
mod run;

fn main() {
    let matches = args::build_cli().get_matches();
    let params = run::RunParams::from_matches(&matches);
    std::process::exit(run::run(&params));
}
