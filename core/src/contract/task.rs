//! Task asset contract
//!
//! A small asset contract sharing the world state with the MedData contract.
//! Tasks are stored at their `ID`; listing is an open scan over the simple keys.

use std::sync::Arc;

use log::info;

use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::models::{self, KeyedRecord, Task};
use crate::stub::ChaincodeStub;

use super::args::{Args, FromArgs, KeyParams, TaskParams, TransferParams};
use super::collector::ResultCollector;
use super::registry::{Contract, InvocationKind, Operation};

/// Task CRUD, registered under the asset-task namespace
#[derive(Debug, Clone)]
pub struct TaskStore {
    config: Arc<CoreConfig>,
}

impl TaskStore {
    /// Create a task store
    pub fn new(config: Arc<CoreConfig>) -> Self {
        TaskStore { config }
    }

    /// Seed the three sample tasks
    pub fn init_tasks(&self, stub: &mut dyn ChaincodeStub) -> Result<Vec<Task>> {
        let tasks = vec![
            Task::new("Task-1", "Buy groceries", "Milk, Cheese, Pizza, Fruit, Tylenol", false, "Worker 1"),
            Task::new("Task-2", "Learn Python", "Need to find a good Python tutorial on the web", false, "Worker 1"),
            Task::new("Task-3", "Use flask", "Use flask to build RESTful service", false, "Worker 1"),
        ];

        for task in &tasks {
            stub.put_state(&task.id, models::to_payload(task)?)?;
            info!("Task {} initialized", task.id);
        }
        Ok(tasks)
    }

    /// Store a task, replacing any task with the same id
    pub fn create_task(&self, stub: &mut dyn ChaincodeStub, params: TaskParams) -> Result<Task> {
        if params.id.is_empty() {
            return Err(CoreError::InvalidArgument("task id is required".to_string()));
        }

        let task = Task::new(&params.id, &params.title, &params.description, params.done, &params.owner);
        stub.put_state(&task.id, models::to_payload(&task)?)?;
        info!("Task {} created for {}", task.id, task.owner);
        Ok(task)
    }

    /// The task stored at `id`
    pub fn read_task(&self, stub: &mut dyn ChaincodeStub, id: &str) -> Result<Task> {
        if id.is_empty() {
            return Err(CoreError::NotFound("task id must not be empty".to_string()));
        }

        match stub.get_state(id)? {
            Some(bytes) if !bytes.is_empty() => models::decode(&bytes)
                .map_err(|e| CoreError::Corrupted(format!("value at {} is not a task: {}", id, e))),
            _ => Err(CoreError::NotFound(format!("the asset task {} does not exist", id))),
        }
    }

    /// Replace an existing task
    pub fn update_task(&self, stub: &mut dyn ChaincodeStub, params: TaskParams) -> Result<Task> {
        self.require_exists(stub, &params.id)?;

        let task = Task::new(&params.id, &params.title, &params.description, params.done, &params.owner);
        stub.put_state(&task.id, models::to_payload(&task)?)?;
        info!("Task {} updated", task.id);
        Ok(task)
    }

    /// Delete an existing task
    pub fn delete_task(&self, stub: &mut dyn ChaincodeStub, id: &str) -> Result<()> {
        self.require_exists(stub, id)?;
        stub.delete_state(id)?;
        info!("Task {} deleted", id);
        Ok(())
    }

    /// Whether a non-empty value is stored at `id`
    pub fn task_exists(&self, stub: &mut dyn ChaincodeStub, id: &str) -> Result<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        Ok(stub.get_state(id)?.map(|bytes| !bytes.is_empty()).unwrap_or(false))
    }

    /// Hand a task over to `new_owner`
    pub fn transfer_task(&self, stub: &mut dyn ChaincodeStub, params: TransferParams) -> Result<Task> {
        let mut task = self.read_task(stub, &params.id)?;
        let previous = std::mem::replace(&mut task.owner, params.new_owner);

        stub.put_state(&task.id, models::to_payload(&task)?)?;
        info!("Task {} transferred from {} to {}", task.id, previous, task.owner);
        Ok(task)
    }

    /// Every simple key of the namespace, tasks and anything stored beside them
    pub fn get_all_tasks(&self, stub: &mut dyn ChaincodeStub) -> Result<Vec<KeyedRecord>> {
        let cursor = stub.get_state_by_range("", "")?;
        ResultCollector::collect_records(cursor)
    }

    fn require_exists(&self, stub: &mut dyn ChaincodeStub, id: &str) -> Result<()> {
        if self.task_exists(stub, id)? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("the asset task {} does not exist", id)))
        }
    }

    fn op_init(&self, stub: &mut dyn ChaincodeStub, _args: &Args<'_>) -> Result<Vec<u8>> {
        self.init_tasks(stub)?;
        Ok(Vec::new())
    }

    fn op_create(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let task = self.create_task(stub, TaskParams::from_args(args)?)?;
        models::to_payload(&task)
    }

    fn op_read(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.read_task(stub, &params.key)?)
    }

    fn op_update(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let task = self.update_task(stub, TaskParams::from_args(args)?)?;
        models::to_payload(&task)
    }

    fn op_delete(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        self.delete_task(stub, &params.key)?;
        Ok(Vec::new())
    }

    fn op_exists(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.task_exists(stub, &params.key)?)
    }

    fn op_transfer(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let task = self.transfer_task(stub, TransferParams::from_args(args)?)?;
        models::to_payload(&task)
    }

    fn op_get_all(&self, stub: &mut dyn ChaincodeStub, _args: &Args<'_>) -> Result<Vec<u8>> {
        models::to_payload(&self.get_all_tasks(stub)?)
    }
}

const TASK_OPERATIONS: &[Operation<TaskStore>] = &[
    Operation { name: "InitTask", kind: InvocationKind::Submit, handler: TaskStore::op_init },
    Operation { name: "CreateTask", kind: InvocationKind::Submit, handler: TaskStore::op_create },
    Operation { name: "InsertTask", kind: InvocationKind::Submit, handler: TaskStore::op_create },
    Operation { name: "ReadTask", kind: InvocationKind::Evaluate, handler: TaskStore::op_read },
    Operation { name: "UpdateTask", kind: InvocationKind::Submit, handler: TaskStore::op_update },
    Operation { name: "DeleteTask", kind: InvocationKind::Submit, handler: TaskStore::op_delete },
    Operation { name: "TaskExists", kind: InvocationKind::Evaluate, handler: TaskStore::op_exists },
    Operation { name: "TransferTask", kind: InvocationKind::Submit, handler: TaskStore::op_transfer },
    Operation { name: "GetAllTasks", kind: InvocationKind::Evaluate, handler: TaskStore::op_get_all },
];

impl Contract for TaskStore {
    fn namespace(&self) -> &str {
        &self.config.namespaces.asset_task
    }

    fn operations(&self) -> &'static [Operation<Self>] {
        TASK_OPERATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldState;

    fn store() -> TaskStore {
        TaskStore::new(Arc::new(CoreConfig::testing()))
    }

    fn params(id: &str, owner: &str) -> TaskParams {
        TaskParams {
            id: id.to_string(),
            title: "Write report".to_string(),
            description: "Quarterly numbers".to_string(),
            done: false,
            owner: owner.to_string(),
        }
    }

    fn seeded() -> WorldState {
        let world = WorldState::new();
        let mut sim = world.simulator("tx-init", 1);
        store().init_tasks(&mut sim).unwrap();
        world.commit(sim.into_rwset()).unwrap();
        world
    }

    #[test]
    fn test_init_and_list() {
        let world = seeded();
        let mut sim = world.simulator("tx-list", 2);
        let all = store().get_all_tasks(&mut sim).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(ids, vec!["Task-1", "Task-2", "Task-3"]);
        assert_eq!(all[0].record["docType"], "assert");
        assert_eq!(all[0].record["Owner"], "Worker 1");
    }

    #[test]
    fn test_list_is_an_open_range_scan() {
        let world = seeded();
        let mut sim = world.simulator("tx-other", 2);
        sim.put_state("not-a-task", br#"{"docType":"other"}"#.to_vec()).unwrap();
        sim.put_state("raw", b"plain text".to_vec()).unwrap();
        let index_key = sim.create_composite_key("key~subkey", &["dev-1", "a"]).unwrap();
        sim.put_state(&index_key, b"{}".to_vec()).unwrap();
        world.commit(sim.into_rwset()).unwrap();

        let mut sim = world.simulator("tx-list", 3);
        let all = store().get_all_tasks(&mut sim).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.key.as_str()).collect();
        // composite index entries stay out of simple-key ranges
        assert_eq!(ids, vec!["Task-1", "Task-2", "Task-3", "not-a-task", "raw"]);
        assert_eq!(all[3].record["docType"], "other");
        assert_eq!(all[4].record, serde_json::json!("plain text"));
        assert!(!sim.rwset().range_queries.is_empty());
    }

    #[test]
    fn test_read_missing_task() {
        let world = seeded();
        let mut sim = world.simulator("tx", 2);
        assert!(matches!(store().read_task(&mut sim, "Task-9"), Err(CoreError::NotFound(_))));
        assert!(matches!(store().read_task(&mut sim, ""), Err(CoreError::NotFound(_))));
        assert!(!store().task_exists(&mut sim, "").unwrap());
    }

    #[test]
    fn test_update_requires_existing_task() {
        let world = seeded();
        let store = store();
        let mut sim = world.simulator("tx", 2);

        assert!(matches!(
            store.update_task(&mut sim, params("Task-9", "Worker 2")),
            Err(CoreError::NotFound(_))
        ));

        let updated = store.update_task(&mut sim, params("Task-1", "Worker 2")).unwrap();
        assert_eq!(updated.doc_type, "assert");
        assert_eq!(sim.rwset().writes.len(), 1);
    }

    #[test]
    fn test_transfer_and_delete() {
        let world = seeded();
        let store = store();

        let mut sim = world.simulator("tx-transfer", 2);
        let task = store
            .transfer_task(&mut sim, TransferParams { id: "Task-2".to_string(), new_owner: "Worker 7".to_string() })
            .unwrap();
        assert_eq!(task.owner, "Worker 7");
        assert_eq!(task.title, "Learn Python");
        world.commit(sim.into_rwset()).unwrap();

        let mut sim = world.simulator("tx-delete", 3);
        store.delete_task(&mut sim, "Task-2").unwrap();
        world.commit(sim.into_rwset()).unwrap();

        let mut sim = world.simulator("tx-check", 4);
        assert!(!store.task_exists(&mut sim, "Task-2").unwrap());
        assert!(matches!(store.delete_task(&mut sim, "Task-2"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn test_operation_table() {
        let world = seeded();
        let store = store();
        let mut sim = world.simulator("tx", 2);

        let values = vec!["Task-1".to_string()];
        let exists = TASK_OPERATIONS
            .iter()
            .find(|op| op.name == "TaskExists")
            .map(|op| (op.handler)(&store, &mut sim, &Args::new("TaskExists", &values)))
            .unwrap()
            .unwrap();
        assert_eq!(exists, b"true");
        assert_eq!(store.namespace(), "org.ttdata.assettask");
    }
}
