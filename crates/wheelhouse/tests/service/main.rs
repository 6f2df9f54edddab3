mod helpers;
mod play_test;
mod progress_test;
mod winners_test;
