fn main() -> std::process::ExitCode {
    stream_recorder_lib::run()
}
