mod failure_test;
mod full_run_test;
