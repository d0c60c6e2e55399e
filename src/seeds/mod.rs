pub mod mock_data_seed;
