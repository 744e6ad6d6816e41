fn main() {
    std::process::exit(gtest_oracle::cli::run());
}
