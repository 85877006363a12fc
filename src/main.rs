fn main() {
    battery_pipeline::cli::run();
}
