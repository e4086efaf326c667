mod unit_concurrent_encoding {

	use std::any::TypeId;
	use std::thread;

	use rill::value::{Native, Record, Reflect, Tag, Type, Value, encode};

	struct ScrapeJob {
		job: String,
		interval: u64,
	}

	impl Record for ScrapeJob {
		fn type_id(&self) -> TypeId {
			TypeId::of::<ScrapeJob>()
		}

		fn type_name(&self) -> &'static str {
			"ScrapeJob"
		}

		fn tags(&self) -> &'static [Tag] {
			&[
				Tag { name: "job", index: 0 },
				Tag { name: "interval", index: 1 },
			]
		}

		fn field(&self, index: usize) -> &dyn Reflect {
			match index {
				0 => &self.job,
				_ => &self.interval,
			}
		}
	}

	impl Reflect for ScrapeJob {
		fn reflect(&self) -> Native<'_> {
			Native::Record(self)
		}
	}

	#[test]
	fn parallel_encodes_of_one_record_type_agree() {
		let ty = Type::object([("job", Type::String), ("interval", Type::Number)]);

		thread::scope(|scope| {
			let mut handles = Vec::new();
			for worker in 0..8 {
				let ty = &ty;
				handles.push(scope.spawn(move || {
					let native = ScrapeJob {
						job: format!("job-{worker}"),
						interval: 15,
					};
					encode(&native, ty).expect("record encodes")
				}));
			}

			for (worker, handle) in handles.into_iter().enumerate() {
				let value = handle.join().expect("worker finishes");
				assert_eq!(
					value.attribute("job").and_then(Value::as_str),
					Some(format!("job-{worker}").as_str()),
				);
				assert_eq!(value.attribute("interval"), Some(&Value::number(15_u64)));
			}
		});
	}
}
